pub mod intent;
pub mod order;
pub mod product;
pub mod tenant;

pub use intent::{ClassifiedIntent, IntentFields, IntentKind};
pub use order::{Order, OrderStatus};
pub use product::Product;
pub use tenant::{OwnerId, TenantIdentity};
