//! Command-line arguments.
//!
//! Every connection flag is optional. Flags win over the config file; see
//! [`crate::config::resolve`].

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use jflint_kernel::HostKeyPolicy;

/// Lint Jenkinsfiles against a Jenkins controller before they are committed.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "lint-jenkinsfile", version, about)]
pub struct Cli {
    /// Jenkinsfiles to lint (pre-commit passes the staged ones).
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// INI config file. Defaults to `<config dir>/jflint/config.ini` if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root URL of the Jenkins controller (selects the HTTP transport).
    #[arg(long = "jenkins-url", alias = "jenkins_url", value_name = "URL")]
    pub jenkins_url: Option<String>,

    /// Login for HTTP Basic auth.
    #[arg(long = "jenkins-login", alias = "jenkins_login", value_name = "LOGIN")]
    pub jenkins_login: Option<String>,

    /// API token for HTTP Basic auth.
    #[arg(long = "jenkins-api-token", alias = "jenkins_api_token", value_name = "TOKEN")]
    pub jenkins_api_token: Option<String>,

    /// Hostname of the controller's SSH endpoint (selects SSH when no URL is set).
    #[arg(long = "jenkins-hostname", alias = "jenkins_hostname", value_name = "HOST")]
    pub jenkins_hostname: Option<String>,

    /// Port of the controller's SSH endpoint [default: 22].
    #[arg(long = "jenkins-ssh-port", alias = "jenkins_sshd_port", value_name = "PORT")]
    pub jenkins_ssh_port: Option<u16>,

    /// Remote SSH user [default: local user].
    #[arg(long = "ssh-user", value_name = "USER")]
    pub ssh_user: Option<String>,

    /// Private key to try after the SSH agent. Repeatable.
    #[arg(long = "ssh-identity", value_name = "PATH")]
    pub ssh_identity: Vec<PathBuf>,

    /// Host key checking: strict, accept-new or accept-all [default: strict].
    #[arg(long = "host-key-policy", value_name = "POLICY")]
    pub host_key_policy: Option<HostKeyPolicy>,

    /// known_hosts file to check and record host keys in [default: ~/.ssh/known_hosts].
    #[arg(long = "known-hosts", value_name = "PATH")]
    pub known_hosts: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_files_and_flags() {
        let cli = Cli::try_parse_from([
            "lint-jenkinsfile",
            "--jenkins-url",
            "https://ci.example.com",
            "--jenkins-login=alice",
            "Jenkinsfile",
            "ci/Jenkinsfile.release",
        ])
        .unwrap();
        assert_eq!(cli.jenkins_url.as_deref(), Some("https://ci.example.com"));
        assert_eq!(cli.jenkins_login.as_deref(), Some("alice"));
        assert_eq!(
            cli.files,
            vec![PathBuf::from("Jenkinsfile"), PathBuf::from("ci/Jenkinsfile.release")]
        );
    }

    #[test]
    fn accepts_snake_case_aliases() {
        let cli = Cli::try_parse_from([
            "lint-jenkinsfile",
            "--jenkins_hostname",
            "ci.example.com",
            "--jenkins_sshd_port",
            "53801",
            "Jenkinsfile",
        ])
        .unwrap();
        assert_eq!(cli.jenkins_hostname.as_deref(), Some("ci.example.com"));
        assert_eq!(cli.jenkins_ssh_port, Some(53801));
    }

    #[test]
    fn parses_host_key_policy() {
        let cli = Cli::try_parse_from(["lint-jenkinsfile", "--host-key-policy", "accept-new"])
            .unwrap();
        assert_eq!(cli.host_key_policy, Some(HostKeyPolicy::AcceptNew));

        let bad = Cli::try_parse_from(["lint-jenkinsfile", "--host-key-policy", "yolo"]);
        assert!(bad.is_err());
    }

    #[test]
    fn parses_known_hosts_path() {
        let cli = Cli::try_parse_from(["lint-jenkinsfile", "--known-hosts", "/ci/known_hosts"])
            .unwrap();
        assert_eq!(cli.known_hosts, Some(PathBuf::from("/ci/known_hosts")));
    }

    #[test]
    fn rejects_out_of_range_port() {
        let cli = Cli::try_parse_from(["lint-jenkinsfile", "--jenkins-ssh-port", "70000"]);
        assert!(cli.is_err());
    }

    #[test]
    fn repeatable_identity_and_verbosity() {
        let cli = Cli::try_parse_from([
            "lint-jenkinsfile",
            "-vv",
            "--ssh-identity",
            "/keys/a",
            "--ssh-identity",
            "/keys/b",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.ssh_identity.len(), 2);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
