// Element-wise binary operations. Operands must have identical shapes; nothing broadcasts.
pub mod add;
pub mod mul;
pub mod sub;
