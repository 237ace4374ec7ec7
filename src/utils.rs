mod byte_reader;
mod generate_session_id;
mod increment_request_id;

pub use byte_reader::ByteReader;
pub use generate_session_id::generate_session_id;
pub use increment_request_id::increment_request_id;
