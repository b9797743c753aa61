#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;

    use serde::Serialize;
    use validator::Validate;

    use crate::{BoxError, ConfigTree, Populate};

    #[derive(ConfigTree, Validate, Serialize, Default, Debug, Clone, PartialEq)]
    pub struct AppConfig {
        #[validate(length(min = 1))]
        pub app_name: String,

        pub debug: bool,

        #[validate(nested)]
        pub database: DatabaseConfig,

        #[validate(nested)]
        pub server: ServerConfig,

        #[validate(nested)]
        pub replicas: Vec<DatabaseConfig>,

        pub labels: BTreeMap<String, String>,
    }

    /// Fills in local-development defaults and counts how often it ran.
    #[derive(ConfigTree, Validate, Serialize, Default, Debug, Clone, PartialEq)]
    #[tree(populate)]
    pub struct DatabaseConfig {
        #[validate(length(min = 1))]
        pub host: String,

        #[validate(range(min = 1, max = 65535))]
        pub port: u16,

        #[validate(length(min = 8))]
        pub password: String,

        #[serde(skip)]
        #[tree(skip)]
        pub populate_calls: u32,
    }

    impl Populate for DatabaseConfig {
        fn populate(&mut self) -> Result<(), BoxError> {
            self.populate_calls += 1;
            if self.host.is_empty() {
                self.host = "localhost".into();
            }
            if self.port == 0 {
                self.port = 5432;
            }
            Ok(())
        }
    }

    #[derive(ConfigTree, Validate, Serialize, Default, Debug, Clone, PartialEq)]
    #[tree(populate)]
    pub struct ServerConfig {
        pub host: String,

        #[validate(range(min = 1, max = 65535))]
        pub port: u16,
    }

    impl Populate for ServerConfig {
        fn populate(&mut self) -> Result<(), BoxError> {
            if self.host.is_empty() {
                self.host = "0.0.0.0".into();
            }
            if self.port == 0 {
                self.port = 8080;
            }
            Ok(())
        }
    }

    #[test]
    fn fixture_populates_defaults() {
        let mut db = DatabaseConfig::default();
        db.populate().unwrap();
        assert_eq!(db.host, "localhost");
        assert_eq!(db.port, 5432);
        assert_eq!(db.populate_calls, 1);
    }
}
