mod dispatcher;
mod request;

pub use dispatcher::Dispatcher;
pub use request::ApiRequest;
