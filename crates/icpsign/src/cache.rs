//! Optional cache of decoded credentials.
//!
//! Opening a PKCS#12 container runs the passphrase KDF and decrypts the key,
//! which dominates the cost of a signing call. Services that sign repeatedly
//! with the same certificate can share a [`CredentialCache`] between signer
//! instances and threads.
//!
//! Entries are keyed by the SHA-256 fingerprint of the signer certificate. A
//! second index maps the digest of (container bytes, passphrase) to that
//! fingerprint, so a lookup never skips passphrase checking: a different
//! passphrase is a different source and goes through extraction again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};

use crate::crypto::digest::{sha256_parts, SHA256_LEN};
use crate::crypto::credentials::{check_framing, Credentials};
use crate::Result;

type Fingerprint = [u8; SHA256_LEN];

#[derive(Default)]
struct Entries {
    by_fingerprint: HashMap<Fingerprint, CachedEntry>,
    by_source: HashMap<[u8; SHA256_LEN], Fingerprint>,
}

struct CachedEntry {
    credentials: Arc<Credentials>,
    subject: Vec<u8>,
}

/// Read-mostly cache of [`Credentials`] keyed by certificate fingerprint.
#[derive(Default)]
pub struct CredentialCache {
    entries: RwLock<Entries>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (hits, misses) = self.stats();
        f.debug_struct("CredentialCache")
            .field("len", &self.len())
            .field("hits", &hits)
            .field("misses", &misses)
            .finish()
    }
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache statistics as `(hits, misses)`.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Number of cached certificates.
    pub fn len(&self) -> usize {
        self.read(|entries| entries.by_fingerprint.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Credentials for a certificate fingerprint, if cached.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Credentials>> {
        self.read(|entries| {
            entries
                .by_fingerprint
                .get(fingerprint)
                .map(|entry| Arc::clone(&entry.credentials))
        })
    }

    /// Insert credentials, replacing any entry for a rotated certificate.
    ///
    /// An existing entry with the same subject but a different fingerprint
    /// belongs to a certificate that has been renewed; it is evicted so the
    /// old key cannot be used by mistake.
    pub fn insert(&self, credentials: Credentials) -> Result<Arc<Credentials>> {
        let fingerprint = credentials.fingerprint()?;
        let subject = credentials.subject_der()?;
        let credentials = Arc::new(credentials);

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let rotated: Vec<Fingerprint> = entries
            .by_fingerprint
            .iter()
            .filter(|(fp, entry)| **fp != fingerprint && entry.subject == subject)
            .map(|(fp, _)| *fp)
            .collect();
        for old in rotated {
            log::info!("Evicting rotated certificate {}", hex::encode(old));
            Self::remove_locked(&mut entries, &old);
        }

        entries.by_fingerprint.insert(
            fingerprint,
            CachedEntry {
                credentials: Arc::clone(&credentials),
                subject,
            },
        );
        Ok(credentials)
    }

    /// Remove a certificate and every source that resolved to it.
    pub fn evict(&self, fingerprint: &Fingerprint) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Self::remove_locked(&mut entries, fingerprint)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.by_fingerprint.clear();
        entries.by_source.clear();
    }

    /// Return cached credentials for a container, extracting them on a miss.
    pub fn get_or_load(
        &self,
        pkcs12: &[u8],
        password: &SecretString,
        strict: bool,
    ) -> Result<Arc<Credentials>> {
        // A lenient caller may have cached this container; strictness is per call
        if strict {
            check_framing(pkcs12)?;
        }

        let source = sha256_parts([
            pkcs12,
            &[0u8],
            password.expose_secret().as_bytes(),
        ]);

        let cached = self.read(|entries| {
            entries
                .by_source
                .get(&source)
                .and_then(|fp| entries.by_fingerprint.get(fp))
                .map(|entry| Arc::clone(&entry.credentials))
        });
        if let Some(credentials) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Credential cache hit");
            return Ok(credentials);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let credentials = Credentials::from_pkcs12(pkcs12, password, strict)?;
        let fingerprint = credentials.fingerprint()?;
        let credentials = self.insert(credentials)?;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.by_source.insert(source, fingerprint);
        Ok(credentials)
    }

    fn read<R>(&self, f: impl FnOnce(&Entries) -> R) -> R {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        f(&entries)
    }

    fn remove_locked(entries: &mut Entries, fingerprint: &Fingerprint) -> bool {
        entries.by_source.retain(|_, fp| fp != fingerprint);
        entries.by_fingerprint.remove(fingerprint).is_some()
    }
}

/// Extract credentials, through `cache` when one is attached.
pub(crate) fn resolve(
    pkcs12: &[u8],
    password: &SecretString,
    strict: bool,
    cache: Option<&CredentialCache>,
) -> Result<Arc<Credentials>> {
    match cache {
        Some(cache) => cache.get_or_load(pkcs12, password, strict),
        None => Credentials::from_pkcs12(pkcs12, password, strict).map(Arc::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        other_rsa_key, pkcs12, rsa_key, self_signed, signer_pkcs12, PASSWORD,
    };
    use crate::Error;

    fn password(value: &str) -> SecretString {
        SecretString::new(value.to_string())
    }

    #[test]
    fn test_get_or_load_hits_after_first_load() {
        let (der, _) = signer_pkcs12();
        let cache = CredentialCache::new();

        let first = cache.get_or_load(&der, &password(PASSWORD), true).unwrap();
        let second = cache.get_or_load(&der, &password(PASSWORD), true).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_wrong_password_is_not_served_from_cache() {
        let (der, _) = signer_pkcs12();
        let cache = CredentialCache::new();
        cache.get_or_load(&der, &password(PASSWORD), true).unwrap();

        let result = cache.get_or_load(&der, &password("wrong"), true);
        assert!(matches!(result, Err(Error::Credential(_))));
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn test_evict_removes_sources() {
        let (der, _) = signer_pkcs12();
        let cache = CredentialCache::new();
        let credentials = cache.get_or_load(&der, &password(PASSWORD), true).unwrap();
        let fingerprint = credentials.fingerprint().unwrap();

        assert!(cache.get(&fingerprint).is_some());
        assert!(cache.evict(&fingerprint));
        assert!(cache.get(&fingerprint).is_none());
        assert!(!cache.evict(&fingerprint));

        cache.get_or_load(&der, &password(PASSWORD), true).unwrap();
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn test_rotation_evicts_previous_certificate() {
        // Same subject name, new key and serial: a renewed certificate
        let old_key = rsa_key();
        let old_cert = self_signed(&old_key, "Rotating Signer", "10");
        let new_key = other_rsa_key();
        let new_cert = self_signed(&new_key, "Rotating Signer", "11");

        let cache = CredentialCache::new();
        let old = cache
            .get_or_load(
                &pkcs12(Some(&old_key), Some(&old_cert), &[], PASSWORD),
                &password(PASSWORD),
                true,
            )
            .unwrap();
        let new = cache
            .get_or_load(
                &pkcs12(Some(&new_key), Some(&new_cert), &[], PASSWORD),
                &password(PASSWORD),
                true,
            )
            .unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&old.fingerprint().unwrap()).is_none());
        assert!(cache.get(&new.fingerprint().unwrap()).is_some());
    }

    #[test]
    fn test_strict_lookup_checks_framing_of_cached_source() {
        let (mut der, _) = signer_pkcs12();
        der.extend_from_slice(&[0x00, 0x00]);
        let cache = CredentialCache::new();

        cache.get_or_load(&der, &password(PASSWORD), false).unwrap();
        let strict = cache.get_or_load(&der, &password(PASSWORD), true);
        assert!(matches!(strict, Err(Error::Credential(_))));
        assert_eq!(cache.stats(), (0, 1));

        assert!(cache.get_or_load(&der, &password(PASSWORD), false).is_ok());
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_clear() {
        let (der, _) = signer_pkcs12();
        let cache = CredentialCache::new();
        cache.get_or_load(&der, &password(PASSWORD), true).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
