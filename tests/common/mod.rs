pub mod fake_pki;
pub mod test_env;
