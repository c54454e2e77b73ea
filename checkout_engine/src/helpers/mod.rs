mod order_code;

pub use order_code::{new_order_code, ORDER_CODE_PREFIX};
