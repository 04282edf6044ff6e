use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Sequence-backed transaction identifier, rendered as `TX` + 8 digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TX{:08}", self.0)
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TransactionType {
    Payment,
    Refund,
    Transfer,
    Deposit,
    Withdrawal,
    Investment,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        Self::Payment,
        Self::Refund,
        Self::Transfer,
        Self::Deposit,
        Self::Withdrawal,
        Self::Investment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "Payment",
            Self::Refund => "Refund",
            Self::Transfer => "Transfer",
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::Investment => "Investment",
        }
    }

    /// Case-insensitive lookup by label. Unknown labels return None.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 3] = [Self::Pending, Self::Completed, Self::Failed];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ComplianceStatus {
    /// Not yet classified. Never stored in the ledger.
    Pending,
    Compliant,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Compliant => "Compliant",
            Self::NonCompliant => "Non-Compliant",
        }
    }
}

/// The compliance rule that rejected a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRule {
    AmountAboveThreshold,
    BlacklistedCounterparty,
    RestrictedType,
}

impl ComplianceRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmountAboveThreshold => "amount_above_threshold",
            Self::BlacklistedCounterparty => "blacklisted_counterparty",
            Self::RestrictedType => "restricted_type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Location {
    #[serde(rename = "Sao Paulo")]
    SaoPaulo,
    #[serde(rename = "Rio de Janeiro")]
    RioDeJaneiro,
    #[serde(rename = "Belo Horizonte")]
    BeloHorizonte,
    Brasilia,
    Curitiba,
    #[serde(rename = "Porto Alegre")]
    PortoAlegre,
    Recife,
    Salvador,
}

impl Location {
    pub const ALL: [Location; 8] = [
        Self::SaoPaulo,
        Self::RioDeJaneiro,
        Self::BeloHorizonte,
        Self::Brasilia,
        Self::Curitiba,
        Self::PortoAlegre,
        Self::Recife,
        Self::Salvador,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaoPaulo => "Sao Paulo",
            Self::RioDeJaneiro => "Rio de Janeiro",
            Self::BeloHorizonte => "Belo Horizonte",
            Self::Brasilia => "Brasilia",
            Self::Curitiba => "Curitiba",
            Self::PortoAlegre => "Porto Alegre",
            Self::Recife => "Recife",
            Self::Salvador => "Salvador",
        }
    }

    /// Case-insensitive lookup by label. Unknown labels return None.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

/// Outlier label assigned by the anomaly scorer. Serialized as 1 / -1 / 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i8")]
pub enum AnomalyLabel {
    Unscored,
    Normal,
    Anomalous,
}

impl From<AnomalyLabel> for i8 {
    fn from(label: AnomalyLabel) -> i8 {
        match label {
            AnomalyLabel::Unscored => 0,
            AnomalyLabel::Normal => 1,
            AnomalyLabel::Anomalous => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockchainStatus {
    Registered,
}

/// A single simulated transaction as stored in the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub timestamp: DateTime<Utc>,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: f64,
    pub fee: f64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub compliance_status: ComplianceStatus,
    pub location: Location,
    pub anomaly_score: AnomalyLabel,
    pub blockchain_status: BlockchainStatus,
    pub notification: String,
    /// First rule that fired for a Non-Compliant verdict.
    pub compliance_reason: Option<ComplianceRule>,
}

impl Transaction {
    /// True once both the compliance verdict and the anomaly label are set.
    pub fn is_enriched(&self) -> bool {
        self.compliance_status != ComplianceStatus::Pending
            && self.anomaly_score != AnomalyLabel::Unscored
    }
}
