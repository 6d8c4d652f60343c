use crate::models::{List, ListError, NameKind};

pub const MIN_NAME_LENGTH: usize = 1;
pub const MAX_NAME_LENGTH: usize = 100;

fn length_in_range(name: &str) -> bool {
    (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name.chars().count())
}

/// Checks a list name against the length rule and the names already taken.
///
/// The duplicate check is an exact, case-sensitive match against every list
/// passed in.
pub fn validate_list_name(name: &str, existing_lists: &[List]) -> Result<(), ListError> {
    if !length_in_range(name) {
        return Err(ListError::InvalidName(NameKind::List));
    }
    if existing_lists.iter().any(|list| list.name == name) {
        return Err(ListError::DuplicateName(name.to_string()));
    }
    Ok(())
}

pub fn validate_todo_name(name: &str) -> Result<(), ListError> {
    if !length_in_range(name) {
        return Err(ListError::InvalidName(NameKind::Todo));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_name_length_bounds() {
        assert!(validate_list_name("a", &[]).is_ok());
        assert!(validate_list_name(&"a".repeat(100), &[]).is_ok());
        assert!(matches!(
            validate_list_name("", &[]),
            Err(ListError::InvalidName(NameKind::List))
        ));
        assert!(matches!(
            validate_list_name(&"a".repeat(101), &[]),
            Err(ListError::InvalidName(NameKind::List))
        ));
    }

    #[test]
    fn test_length_counts_characters() {
        // 100 two-byte characters are still 100 characters
        assert!(validate_todo_name(&"é".repeat(100)).is_ok());
        assert!(validate_todo_name(&"é".repeat(101)).is_err());
    }

    #[test]
    fn test_duplicate_is_case_sensitive() {
        let lists = vec![List::new(1, "Groceries".to_string())];
        assert!(matches!(
            validate_list_name("Groceries", &lists),
            Err(ListError::DuplicateName(name)) if name == "Groceries"
        ));
        assert!(validate_list_name("groceries", &lists).is_ok());
    }

    #[test]
    fn test_length_checked_before_uniqueness() {
        let lists = vec![List::new(1, "x".repeat(101))];
        assert!(matches!(
            validate_list_name(&"x".repeat(101), &lists),
            Err(ListError::InvalidName(_))
        ));
    }

    #[test]
    fn test_todo_name_bounds() {
        assert!(validate_todo_name("Milk").is_ok());
        assert!(matches!(
            validate_todo_name(""),
            Err(ListError::InvalidName(NameKind::Todo))
        ));
    }
}
