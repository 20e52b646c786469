use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::User => "USER",
        }
    }
}

impl TryFrom<&str> for UserRole {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ADMIN" => Ok(UserRole::Admin),
            "USER" => Ok(UserRole::User),
            _ => Err(()),
        }
    }
}

/// The three fixed ESG categories. Variant order drives report ordering.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[sqlx(type_name = "esg_section")]
pub enum Section {
    Environmental,
    Social,
    Governance,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Environmental, Section::Social, Section::Governance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Environmental => "Environmental",
            Section::Social => "Social",
            Section::Governance => "Governance",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    YesNo,
    Scale,
    TextInput,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::YesNo => "yes_no",
            QuestionType::Scale => "scale",
            QuestionType::TextInput => "text_input",
        }
    }

    /// text_input answers are free-form and never scored; every other type
    /// scores through its option table.
    pub fn is_scored(&self) -> bool {
        !matches!(self, QuestionType::TextInput)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "aggregation_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    Sum,
    Average,
    WeightedAverage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_serializes_to_label() {
        assert_eq!(
            serde_json::to_string(&Section::Environmental).unwrap(),
            "\"Environmental\""
        );
        assert_eq!(Section::Governance.as_str(), "Governance");
    }

    #[test]
    fn question_type_round_trips_snake_case() {
        let parsed: QuestionType = serde_json::from_str("\"multiple_choice\"").unwrap();
        assert_eq!(parsed, QuestionType::MultipleChoice);
        assert!(!QuestionType::TextInput.is_scored());
        assert!(QuestionType::Scale.is_scored());
    }

    #[test]
    fn role_parses_from_db_label() {
        assert_eq!(UserRole::try_from("ADMIN"), Ok(UserRole::Admin));
        assert!(UserRole::try_from("root").is_err());
    }
}
