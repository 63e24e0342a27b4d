//! Startup script run as the node container's command.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::port::outbound::certificate::WebCertificate;

/// File the generator arguments are written to inside the container.
pub const GEN_DEV_ARGS: &str = "/tmp/gen_dev_args.json";

const NODE_DIR: &str = "/root/bin/node";
const CA_FILE: &str = "TestWebServerCa.pem";

/// Inputs of one node's startup script.
#[derive(Debug, Clone, Copy)]
pub struct StartupScript<'a> {
    pub node_document: &'a Value,
    pub certificate: &'a WebCertificate,
    pub pre_start_commands: &'a str,
    pub bindir: &'a Path,
    /// Release executable under `/root/bin/node/bin`.
    pub executable: &'a str,
    /// Owner of files the node writes to the shared log directory.
    pub uid: u32,
    pub gid: u32,
}

impl StartupScript<'_> {
    /// Renders the shell script.
    ///
    /// # Errors
    ///
    /// Fails only when the node document cannot be serialized.
    pub fn render(&self) -> Result<String> {
        let document = serde_json::to_string_pretty(self.node_document)?;
        let mut script = String::from("set -e\n");

        let _ = writeln!(script, "mkdir -p {NODE_DIR}/log/");
        let _ = writeln!(script, "mkdir -p {NODE_DIR}/etc/certs");
        let _ = writeln!(script, "mkdir -p {NODE_DIR}/etc/cacerts");
        let _ = writeln!(
            script,
            "bindfs --create-for-user={uid} --create-for-group={gid} {NODE_DIR}/log {NODE_DIR}/log",
            uid = self.uid,
            gid = self.gid,
        );
        heredoc(&mut script, GEN_DEV_ARGS, &document);
        heredoc(
            &mut script,
            &format!("{NODE_DIR}/etc/certs/web_key.pem"),
            &self.certificate.key_pem,
        );
        heredoc(
            &mut script,
            &format!("{NODE_DIR}/etc/certs/web_cert.pem"),
            &self.certificate.cert_pem,
        );
        heredoc(
            &mut script,
            &format!("{NODE_DIR}/etc/certs/web_chain.pem"),
            &self.certificate.chain_pem,
        );
        heredoc(
            &mut script,
            &format!("{NODE_DIR}/etc/cacerts/{CA_FILE}"),
            &self.certificate.chain_pem,
        );

        let pre_start = self.pre_start_commands.trim_end();
        if !pre_start.is_empty() {
            let _ = writeln!(script, "{pre_start}");
        }
        let bindir = self.bindir.to_string_lossy();
        let _ = writeln!(script, "ln -s {} /root/build", shell_quote(&bindir));
        let _ = writeln!(script, "{NODE_DIR}/bin/{} console", self.executable);
        Ok(script)
    }
}

fn heredoc(script: &mut String, path: &str, content: &str) {
    let _ = writeln!(script, "cat <<\"EOF\" > {path}");
    let _ = writeln!(script, "{}", content.trim_end_matches('\n'));
    let _ = writeln!(script, "EOF");
}

/// `word` as a single shell word, single-quoted unless it is plain.
fn shell_quote(word: &str) -> Cow<'_, str> {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:@%,=".contains(c));
    if plain {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
    }
}

/// Effective user and group ids of this process.
#[must_use]
pub fn effective_ids() -> (u32, u32) {
    // SAFETY: geteuid and getegid have no preconditions and cannot fail.
    unsafe { (libc::geteuid(), libc::getegid()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn certificate() -> WebCertificate {
        WebCertificate {
            key_pem: "KEY\n".to_string(),
            cert_pem: "CERT\n".to_string(),
            chain_pem: "CHAIN\n".to_string(),
        }
    }

    #[test]
    fn script_writes_files_then_starts_release() {
        let document = json!({ "cluster_worker": { "db_driver": "couchbase" } });
        let certificate = certificate();
        let script = StartupScript {
            node_document: &document,
            certificate: &certificate,
            pre_start_commands: "escript gen.escript /tmp/gen_dev_args.json",
            bindir: Path::new("/opt/src"),
            executable: "cluster_worker",
            uid: 1000,
            gid: 100,
        }
        .render()
        .unwrap();

        assert!(script.starts_with("set -e\n"));
        assert!(script.contains("bindfs --create-for-user=1000 --create-for-group=100"));
        assert!(script.contains("cat <<\"EOF\" > /tmp/gen_dev_args.json\n{"));
        assert!(script.contains("\"db_driver\": \"couchbase\""));
        assert!(script.contains("cat <<\"EOF\" > /root/bin/node/etc/certs/web_key.pem\nKEY\nEOF\n"));
        assert!(script.contains("/root/bin/node/etc/cacerts/TestWebServerCa.pem\nCHAIN\nEOF\n"));

        let pre_start = script.find("escript gen.escript").unwrap();
        let link = script.find("ln -s /opt/src /root/build").unwrap();
        let console = script.find("/root/bin/node/bin/cluster_worker console").unwrap();
        assert!(pre_start < link && link < console);
        assert!(script.ends_with("console\n"));
    }

    #[test]
    fn empty_pre_start_leaves_no_blank_step() {
        let document = json!({});
        let certificate = certificate();
        let script = StartupScript {
            node_document: &document,
            certificate: &certificate,
            pre_start_commands: "",
            bindir: Path::new("/opt/src"),
            executable: "app",
            uid: 0,
            gid: 0,
        }
        .render()
        .unwrap();
        assert!(script.contains("EOF\nln -s /opt/src /root/build\n"));
    }

    #[test]
    fn source_path_with_spaces_is_quoted() {
        let document = json!({});
        let certificate = certificate();
        let script = StartupScript {
            node_document: &document,
            certificate: &certificate,
            pre_start_commands: "",
            bindir: Path::new("/home/dev/it's src"),
            executable: "app",
            uid: 0,
            gid: 0,
        }
        .render()
        .unwrap();
        assert!(script.contains("ln -s '/home/dev/it'\\''s src' /root/build\n"));
    }
}
