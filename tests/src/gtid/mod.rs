pub mod gtids_test;
