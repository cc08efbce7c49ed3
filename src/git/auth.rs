use git2::{Cred, CredentialType, FetchOptions, PushOptions, RemoteCallbacks};

// libgit2 keeps asking while a credential is rejected
const MAX_CREDENTIAL_ATTEMPTS: u8 = 3;

/// Credentials for talking to `origin`: the ssh agent for SSH remotes, the
/// API token for HTTPS ones. Local path remotes need neither.
#[derive(Clone, Default)]
pub struct GitAuth {
    token: Option<String>,
}

impl GitAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        let mut attempts = 0u8;

        callbacks.credentials(move |_url, username, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            let user = username.unwrap_or("git");
            if allowed.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(user);
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = self.token.as_deref() {
                    return Cred::userpass_plaintext("x-access-token", token);
                }
            }
            if allowed.contains(CredentialType::USERNAME) {
                return Cred::username(user);
            }
            Cred::default()
        });

        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => Err(git2::Error::from_str(&format!(
                "push of {refname} rejected: {reason}"
            ))),
            None => Ok(()),
        });

        callbacks
    }

    pub fn fetch_options(&self) -> FetchOptions<'_> {
        let mut opts = FetchOptions::new();
        opts.remote_callbacks(self.callbacks());
        opts
    }

    pub fn push_options(&self) -> PushOptions<'_> {
        let mut opts = PushOptions::new();
        opts.remote_callbacks(self.callbacks());
        opts
    }
}

impl std::fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitAuth")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
