//! Proxied link construction.

use crate::camo::signer::Signer;
use crate::camo::types::ImageReference;

/// A proxied image URL in its raw form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedUrl(String);

impl ProxiedUrl {
    /// `{base_url}&digest={digest}&image={encoded}`
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Same URL with `&` escaped for embedding in markup.
    pub fn html(&self) -> String {
        self.0.replace('&', "&amp;")
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ProxiedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds proxied URLs for one signer. Pure, no network access.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    signer: Signer,
}

impl LinkBuilder {
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn build(&self, original: &ImageReference) -> ProxiedUrl {
        ProxiedUrl(format!(
            "{}&digest={}&image={}",
            self.signer.base_url(),
            self.signer.digest(),
            self.signer.encode_image(original)
        ))
    }
}
