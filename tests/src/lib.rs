//! End-to-end scenarios spanning configuration, probing and exposition.

mod collection {
    mod integration;
}

mod config {
    mod integration;
}
