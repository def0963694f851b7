// Edit session shared by the `sheets` binary and its tests

pub mod session;
