use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub uuid::Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which intake form a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Contact,
    Proposal,
}

impl FormKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Proposal => "proposal",
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            Self::Contact => "/api/contact",
            Self::Proposal => "/api/proposal",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::Contact => "contact_messages",
            Self::Proposal => "project_proposals",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    #[default]
    Job,
    Freelance,
    Question,
    Other,
}

impl ContactKind {
    pub const ALL: [Self; 4] = [Self::Job, Self::Freelance, Self::Question, Self::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Freelance => "freelance",
            Self::Question => "question",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BudgetBracket {
    #[default]
    #[serde(rename = "<1000")]
    Under1k,
    #[serde(rename = "1000-5000")]
    From1kTo5k,
    #[serde(rename = "5000-10000")]
    From5kTo10k,
    #[serde(rename = ">10000")]
    Over10k,
}

impl BudgetBracket {
    pub const ALL: [Self; 4] = [
        Self::Under1k,
        Self::From1kTo5k,
        Self::From5kTo10k,
        Self::Over10k,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Under1k => "<1000",
            Self::From1kTo5k => "1000-5000",
            Self::From5kTo10k => "5000-10000",
            Self::Over10k => ">10000",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: ContactKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalSubmission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub budget: BudgetBracket,
    pub deadline: String,
    pub description: String,
}
