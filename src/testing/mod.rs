mod mock;

pub(crate) use mock::MockRegisters;
