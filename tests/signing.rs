mod common;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use saml_sp::saml::Binding;
use saml_sp::signature::{SignError, SignatureAlgorithm};
use saml_sp::xml::{XmlDocument, canonicalize};
use saml_sp::{Error, ServiceProvider};

fn signing_sp(algorithm: SignatureAlgorithm) -> ServiceProvider {
    let mut config = common::sp_config();
    config.sign_authn_requests = true;
    config.signature_algorithm = algorithm;
    config.credentials = Some(if algorithm.is_ecdsa() {
        common::ec_credentials()
    } else {
        common::rsa_credentials()
    });
    ServiceProvider::new(config).unwrap()
}

#[test]
fn test_redirect_signature_verifies_over_ordered_query() {
    for algorithm in [
        SignatureAlgorithm::RsaSha256,
        SignatureAlgorithm::EcdsaSha256,
    ] {
        let sp = signing_sp(algorithm);
        let url = sp.build_auth_url(Some("foobar")).unwrap();

        let names: Vec<_> = common::query_pairs(&url).into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["SAMLRequest", "RelayState", "SigAlg", "Signature"]);
        assert_eq!(
            common::query_param(&url, "SigAlg").as_deref(),
            Some(algorithm.uri())
        );

        let query = url.split_once('?').unwrap().1;
        let (signed, signature) = query.rsplit_once("&Signature=").unwrap();
        let signature = BASE64
            .decode(urlencoding::decode(signature).unwrap().as_bytes())
            .unwrap();

        let certificate = sp.signer().unwrap().certificate();
        assert!(
            certificate
                .verify(signed.as_bytes(), &signature, algorithm.hash_alg())
                .unwrap()
        );

        // The request itself carries no embedded signature
        let saml_request = common::query_param(&url, "SAMLRequest").unwrap();
        let xml = saml_sp::binding::decode_redirect(&saml_request).unwrap();
        assert!(!xml.contains("Signature"));
    }
}

#[test]
fn test_redirect_signature_without_relay_state() {
    let sp = signing_sp(SignatureAlgorithm::RsaSha256);
    let url = sp.build_auth_url(None).unwrap();
    let names: Vec<_> = common::query_pairs(&url).into_iter().map(|(k, _)| k).collect();
    assert_eq!(names, ["SAMLRequest", "SigAlg", "Signature"]);
}

#[test]
fn test_embedded_signature_for_post() {
    let sp = signing_sp(SignatureAlgorithm::RsaSha256);
    let signer = sp.signer().unwrap();
    let body = sp.build_auth_body_post().unwrap();
    let xml = saml_sp::binding::decode_post(&body).unwrap();
    let doc = XmlDocument::parse(&xml).unwrap();
    let root = doc.root();

    let children = doc.children(root);
    assert_eq!(doc.element(children[1]).name(), "ds:Signature");

    // Enveloped transform: digest over the request without its signature
    let start = xml.find("<ds:Signature").unwrap();
    let end = xml.find("</ds:Signature>").unwrap() + "</ds:Signature>".len();
    let unsigned = format!("{}{}", &xml[..start], &xml[end..]);
    let hash_alg = signer.algorithm().hash_alg();
    let canonical = canonicalize(&unsigned, signer.canonicalization(), &[]).unwrap();
    let digest = doc
        .find_path(&[
            "AuthnRequest",
            "Signature",
            "SignedInfo",
            "Reference",
            "DigestValue",
        ])
        .unwrap();
    assert_eq!(
        doc.text(digest),
        BASE64.encode(hash_alg.hash(canonical.as_bytes()).unwrap())
    );

    let reference = doc
        .find_path(&["AuthnRequest", "Signature", "SignedInfo", "Reference"])
        .unwrap();
    let id = doc.attribute(root, "ID").unwrap();
    assert_eq!(doc.attribute(reference, "URI"), Some(format!("#{id}").as_str()));

    let signed_info = doc
        .find_path(&["AuthnRequest", "Signature", "SignedInfo"])
        .unwrap();
    let canonical_signed_info = canonicalize(
        &doc.subtree_to_string(signed_info).unwrap(),
        signer.canonicalization(),
        &[],
    )
    .unwrap();
    let value = doc
        .find_path(&["AuthnRequest", "Signature", "SignatureValue"])
        .unwrap();
    let signature = BASE64.decode(doc.text(value)).unwrap();
    assert!(
        signer
            .certificate()
            .verify(canonical_signed_info.as_bytes(), &signature, hash_alg)
            .unwrap()
    );
}

#[test]
fn test_redirect_document_is_not_embedded_signed() {
    let sp = signing_sp(SignatureAlgorithm::RsaSha256);
    let doc = sp
        .build_auth_request_document(Binding::HttpRedirect)
        .unwrap();
    assert!(doc.find_child(doc.root(), "Signature").is_none());
}

#[test]
fn test_signing_enabled_without_key() {
    let mut config = common::sp_config();
    config.sign_authn_requests = true;
    assert!(matches!(
        ServiceProvider::new(config),
        Err(Error::Sign(SignError::NoKeyConfigured))
    ));
}

#[test]
fn test_rsa_key_with_ecdsa_algorithm() {
    let mut config = common::sp_config();
    config.sign_authn_requests = true;
    config.signature_algorithm = SignatureAlgorithm::EcdsaSha256;
    config.credentials = Some(common::rsa_credentials());
    assert!(matches!(
        ServiceProvider::new(config),
        Err(Error::Sign(SignError::AlgorithmMismatch { .. }))
    ));
}
