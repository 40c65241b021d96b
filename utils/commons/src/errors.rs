use super::*;

/// The custom errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Reveal start is not in the future, or reveal finish is not after reveal
    /// start (Error code: -4).
    InvalidSchedule,
    /// Operation is not permitted in the current auction phase (Error code: -5).
    WrongPhase,
    /// Sender never placed a bid (Error code: -6).
    UnknownBidder,
    /// Sender has already revealed the bid (Error code: -7).
    AlreadyRevealed,
    /// Revealed value and nonce do not hash to the committed bid (Error code: -8).
    CommitmentMismatch,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_error_codes() {
        claim_eq!(i32::from(Reject::from(CustomContractError::ParseParams).error_code), -1);
        claim_eq!(i32::from(Reject::from(CustomContractError::InvalidSchedule).error_code), -4);
        claim_eq!(i32::from(Reject::from(CustomContractError::WrongPhase).error_code), -5);
        claim_eq!(i32::from(Reject::from(CustomContractError::UnknownBidder).error_code), -6);
        claim_eq!(i32::from(Reject::from(CustomContractError::AlreadyRevealed).error_code), -7);
        claim_eq!(i32::from(Reject::from(CustomContractError::CommitmentMismatch).error_code), -8);
    }

    #[concordium_test]
    fn test_log_error_mapping() {
        claim_eq!(
            CustomContractError::from(LogError::Full),
            CustomContractError::LogFull
        );
        claim_eq!(
            CustomContractError::from(LogError::Malformed),
            CustomContractError::LogMalformed
        );
    }
}
