#[derive(Debug, PartialEq, Eq)]
/// DS2482 Hardware Errors
pub enum Ds2482Error<E> {
    /// I2C bus errors.
    I2c(E),
    /// A bounded status poll (busy-wait or device reset) exhausted its retry
    /// budget without the bridge reporting ready.
    Timeout,
}

impl<E> From<E> for Ds2482Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}
