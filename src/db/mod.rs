pub mod connection;
pub mod kv;
pub mod legacy;
pub mod migrations;
#[cfg(test)]
pub mod test_fixtures;
