pub(crate) mod lr;
