pub mod outbound;

pub use outbound::{
    CheckoutSession, CheckoutSessionProvider, NotificationSink, NotifyError, ProviderError,
};
