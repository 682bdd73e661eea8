use thiserror::Error;

/// Input rejected locally, before any store call. The message is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Key cannot be empty.")]
    EmptyKey,
    #[error("Key already exists.")]
    DuplicateKey,
    #[error("must be an integer")]
    NotInteger,
    #[error("must be true/false")]
    NotBool,
    #[error("date cannot be empty")]
    EmptyDate,
    #[error("must be YYYY-MM-DD or RFC3339")]
    NotDate,
    #[error("Please enter a repository URL.")]
    EmptyUrl,
    #[error("Use a full repo URL (https://... or git@...).")]
    NotRepoUrl,
    #[error("Only GitHub repo URLs are supported for now.")]
    UnsupportedHost,
    #[error("Repo already exists in the list.")]
    DuplicateRepo,
}
