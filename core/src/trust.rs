/*
 * trust.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a generic typed JSON-over-HTTP client.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Certificate trust policy: a stateless callback consulted once per TLS
//! handshake, plus the rustls verifier that routes handshakes through it.
//!
//! The policy must never block or perform I/O; it is a pure decision over the
//! presented chain and the stored option flag.

use std::fmt;
use std::sync::Arc;

use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::client::WebPkiServerVerifier;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme,
};

use crate::options::ClientOptions;
use crate::transport::TransportError;

/// Outcome of a trust decision for one presented certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Trust the presented chain and proceed with its credentials.
    AcceptPresented,
    /// Defer to default validation; neither force-accept nor force-reject.
    UseDefault,
}

/// Trust policy callback. Any callable with this signature qualifies; the
/// client registers one with its transport at construction and never
/// reassigns it. Invoked synchronously, possibly many times (once per
/// handshake) over the client's lifetime.
pub type TrustPolicy = Arc<dyn Fn(&[CertificateDer<'static>]) -> TrustDecision + Send + Sync>;

/// Policy derived from option flags: with
/// [`ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES`] the chain is accepted
/// unconditionally, otherwise validation is deferred to the default logic.
/// The chain contents never influence the decision.
pub fn trust_policy_for(options: ClientOptions) -> TrustPolicy {
    Arc::new(move |_chain: &[CertificateDer<'static>]| {
        if options.contains(ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES) {
            TrustDecision::AcceptPresented
        } else {
            TrustDecision::UseDefault
        }
    })
}

/// rustls server-certificate verifier that consults a [`TrustPolicy`] for
/// each handshake and falls back to webpki validation when the policy defers.
pub struct PolicyVerifier {
    policy: TrustPolicy,
    default_verifier: Arc<WebPkiServerVerifier>,
}

impl PolicyVerifier {
    /// Build over the given roots; `roots` back the default-validation path.
    pub fn new(policy: TrustPolicy, roots: RootCertStore) -> Result<Self, TransportError> {
        let default_verifier = WebPkiServerVerifier::builder(Arc::new(roots))
            .build()
            .map_err(|e| TransportError::with_source("TLS verifier construction failed", e))?;
        Ok(Self {
            policy,
            default_verifier,
        })
    }
}

impl fmt::Debug for PolicyVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyVerifier").finish_non_exhaustive()
    }
}

impl ServerCertVerifier for PolicyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        let mut chain = Vec::with_capacity(1 + intermediates.len());
        chain.push(end_entity.clone().into_owned());
        chain.extend(intermediates.iter().map(|c| c.clone().into_owned()));
        match (*self.policy)(&chain) {
            TrustDecision::AcceptPresented => Ok(ServerCertVerified::assertion()),
            TrustDecision::UseDefault => self.default_verifier.verify_server_cert(
                end_entity,
                intermediates,
                server_name,
                ocsp_response,
                now,
            ),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        let chain = [cert.clone().into_owned()];
        match (*self.policy)(&chain) {
            TrustDecision::AcceptPresented => Ok(HandshakeSignatureValid::assertion()),
            TrustDecision::UseDefault => {
                self.default_verifier.verify_tls12_signature(message, cert, dss)
            }
        }
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        let chain = [cert.clone().into_owned()];
        match (*self.policy)(&chain) {
            TrustDecision::AcceptPresented => Ok(HandshakeSignatureValid::assertion()),
            TrustDecision::UseDefault => {
                self.default_verifier.verify_tls13_signature(message, cert, dss)
            }
        }
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.default_verifier.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_chain() -> Vec<CertificateDer<'static>> {
        vec![CertificateDer::from(vec![0x30, 0x82, 0x00, 0x00])]
    }

    #[test]
    fn flag_set_accepts_any_chain() {
        let policy = trust_policy_for(ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES);
        assert_eq!((*policy)(&fake_chain()), TrustDecision::AcceptPresented);
        assert_eq!((*policy)(&[]), TrustDecision::AcceptPresented);
    }

    #[test]
    fn flag_absent_defers_for_any_chain() {
        let policy = trust_policy_for(ClientOptions::default());
        assert_eq!((*policy)(&fake_chain()), TrustDecision::UseDefault);
        assert_eq!((*policy)(&[]), TrustDecision::UseDefault);
    }

    #[test]
    fn decision_depends_only_on_flags() {
        let accept = trust_policy_for(ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES);
        let defer = trust_policy_for(ClientOptions::empty());
        for chain in [fake_chain(), Vec::new()] {
            assert_eq!((*accept)(&chain), TrustDecision::AcceptPresented);
            assert_eq!((*defer)(&chain), TrustDecision::UseDefault);
        }
    }
}
