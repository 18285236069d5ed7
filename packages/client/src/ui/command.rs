//! Prompt line parsing.

use crate::{domain::FormField, error::CommandError};

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything that is not a `/command` goes to the assistant
    Chat(String),
    /// `/set <field> <value>`; an empty value clears the field
    Set { field: FormField, value: String },
    ShowForm,
    ShowHistory,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Chat(line.to_string()));
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "set" => {
                let (field, value) = match args.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim()),
                    None => (args, ""),
                };
                if field.is_empty() {
                    return Err(CommandError::MissingField);
                }
                Ok(Command::Set {
                    field: field.parse()?,
                    value: value.to_string(),
                })
            }
            "form" => Ok(Command::ShowForm),
            "history" => Ok(Command::ShowHistory),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormError;

    #[test]
    fn test_plain_line_is_chat() {
        // テスト項目: スラッシュで始まらない行はチャットとして扱われる
        // given (前提条件):
        let line = "Tôi bị sốt 3 ngày";

        // when (操作):
        let result = Command::parse(line);

        // then (期待する結果):
        assert_eq!(result, Ok(Command::Chat("Tôi bị sốt 3 ngày".to_string())));
    }

    #[test]
    fn test_set_keeps_spaces_in_value() {
        // テスト項目: /set の値は空白を含めてそのまま保持される
        // given (前提条件):
        let line = "/set name Nguyễn Văn A";

        // when (操作):
        let result = Command::parse(line);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Command::Set {
                field: FormField::Name,
                value: "Nguyễn Văn A".to_string(),
            })
        );
    }

    #[test]
    fn test_set_without_value_clears_field() {
        // テスト項目: 値なしの /set はフィールドを空にする
        // given (前提条件):
        let line = "/set phone";

        // when (操作):
        let result = Command::parse(line);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Command::Set {
                field: FormField::Phone,
                value: String::new(),
            })
        );
    }

    #[test]
    fn test_set_accepts_field_alias() {
        // テスト項目: フィールド名の別名が使える
        // given (前提条件):
        let line = "/set date_of_birth 01/02/1990";

        // when (操作):
        let result = Command::parse(line);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Command::Set {
                field: FormField::DateOfBirth,
                value: "01/02/1990".to_string(),
            })
        );
    }

    #[test]
    fn test_set_errors() {
        // テスト項目: /set の引数不足や未知のフィールドはエラーになる
        // given (前提条件):
        let missing = "/set";
        let unknown = "/set blood-type O";

        // when (操作):
        let missing = Command::parse(missing);
        let unknown = Command::parse(unknown);

        // then (期待する結果):
        assert_eq!(missing, Err(CommandError::MissingField));
        assert_eq!(
            unknown,
            Err(CommandError::Form(FormError::UnknownField(
                "blood-type".to_string()
            )))
        );
    }

    #[test]
    fn test_simple_commands() {
        // テスト項目: 引数なしのコマンドが解析される
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(Command::parse("/form"), Ok(Command::ShowForm));
        assert_eq!(Command::parse("/history"), Ok(Command::ShowHistory));
        assert_eq!(Command::parse("/status"), Ok(Command::Status));
        assert_eq!(Command::parse("/HELP"), Ok(Command::Help));
        assert_eq!(Command::parse("/quit"), Ok(Command::Quit));
        assert_eq!(
            Command::parse("/reset"),
            Err(CommandError::UnknownCommand("reset".to_string()))
        );
    }
}
