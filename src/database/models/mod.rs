pub mod user;
pub mod service;
pub mod transaction;
pub mod committee;

pub use user::{Role, Session, User, UserSummary};
pub use service::{NewService, Service, ServicePatch, ServiceType};
pub use transaction::{
    NewTransaction, StatusTotal, Transaction, TransactionFilter, TransactionStats,
    TransactionStatus,
};
pub use committee::{
    CommitteeMember, CommitteeMemberDetail, DeceasedStatus, DeceasedTarget, Dependent,
    FinancialHealth, FuneralPayout, MonthKey, NewDependent, NewPayout, OutstandingBalance,
    PaymentStatus, PayoutRecord, Subscription,
};
