pub mod cache;
pub mod dispatcher;
pub mod identifier;
pub mod lookup;
pub mod metrics;
pub mod redis;
pub mod resolver;
pub mod scanner;
pub mod selection;
pub mod settings;
pub mod store;
pub mod url_builder;
