use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Installs packages into the project and saves them as dependencies.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(&self, project_dir: &Path, packages: &[String]) -> Result<()>;
}

/// Shells out to `<npm> install --save --silent <packages>`.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    command: String,
}

impl NpmInstaller {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn args(packages: &[String]) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            "--save".to_string(),
            "--silent".to_string(),
        ];
        args.extend(packages.iter().cloned());
        args
    }
}

#[async_trait]
impl PackageInstaller for NpmInstaller {
    async fn install(&self, project_dir: &Path, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }

        let args = Self::args(packages);
        info!(command = %self.command, ?args, "running package install");

        let output = Command::new(&self.command)
            .args(&args)
            .current_dir(project_dir)
            .output()
            .await
            .with_context(|| format!("Failed to run \"{}\"", self.command))?;

        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "package install output");

        if !output.status.success() {
            bail!(
                "\"{} {}\" failed ({}): {}",
                self.command,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Renders the manual install command shown when the operator skips installation.
pub fn manual_install_command(packages: &[String]) -> String {
    format!("npm install {} --save", packages.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_put_flags_before_packages() {
        let args = NpmInstaller::args(&["jsreport@2.x.x".to_string()]);
        assert_eq!(args, vec!["install", "--save", "--silent", "jsreport@2.x.x"]);
    }

    #[test]
    fn manual_command_lists_every_package() {
        let cmd = manual_install_command(&[
            "jsreport@2.x.x".to_string(),
            "jsreport-fop-pdf@2.x.x".to_string(),
        ]);
        assert_eq!(cmd, "npm install jsreport@2.x.x jsreport-fop-pdf@2.x.x --save");
    }

    #[tokio::test]
    async fn empty_package_list_is_a_no_op() {
        let installer = NpmInstaller::new("definitely-not-a-real-binary");
        installer
            .install(Path::new("."), &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_command_is_reported() {
        let installer = NpmInstaller::new("definitely-not-a-real-binary");
        let err = installer
            .install(Path::new("."), &["jsreport@2.x.x".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-binary"));
    }
}
