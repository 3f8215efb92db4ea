pub mod mailer;
pub mod method_gateway;
pub mod notifier;
pub mod scheme_resolver;
pub mod verification;
