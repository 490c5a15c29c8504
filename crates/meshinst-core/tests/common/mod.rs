pub mod fakes;
pub mod release_server;
