pub mod entities;

pub use entities::payment::{PaymentDetails, PaymentStatus};
pub use entities::receipt::ReceiptStatus;
