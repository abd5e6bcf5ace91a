mod common;

use axum::http::{StatusCode, header};
use chrono::{DateTime, Utc};
use saml_sp::ServiceProvider;
use saml_sp::binding::decode_redirect;
use saml_sp::xml::XmlDocument;
use url::Url;

#[test]
fn test_redirect_login_round_trip() {
    let sp = ServiceProvider::new(common::sp_config()).unwrap();
    let before = Utc::now();

    let response = sp.auth_redirect(Some("foobar")).unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().len(), 1);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let url = Url::parse(&location).unwrap();
    let sso = Url::parse(common::SSO_URL).unwrap();
    assert_eq!(url.scheme(), sso.scheme());
    assert_eq!(url.host_str(), Some("idp.test"));
    assert_eq!(url.path(), sso.path());

    assert_eq!(
        common::query_param(&location, "RelayState").as_deref(),
        Some("foobar")
    );

    let saml_request = common::query_param(&location, "SAMLRequest").unwrap();
    let doc = XmlDocument::parse(&decode_redirect(&saml_request).unwrap()).unwrap();
    let root = doc.root();

    let issuer = doc.find_child(root, "Issuer").unwrap();
    let issuer_url = Url::parse(doc.text(issuer)).unwrap();
    assert_eq!(issuer_url.host_str(), Some("sp.test"));
    assert_eq!(doc.attribute(root, "Destination"), Some(common::SSO_URL));

    let issue_instant = doc.attribute(root, "IssueInstant").unwrap();
    assert!(issue_instant.ends_with('Z'));
    let issue_instant = DateTime::parse_from_rfc3339(issue_instant)
        .unwrap()
        .with_timezone(&Utc);
    assert!((issue_instant - before).num_seconds().abs() <= 1);
}

#[test]
fn test_url_differs_from_sso_url_only_by_query() {
    let sp = ServiceProvider::new(common::sp_config()).unwrap();
    let url = sp.build_auth_url(None).unwrap();
    let (target, query) = url.split_once('?').unwrap();
    assert_eq!(target, common::SSO_URL);
    assert!(query.starts_with("SAMLRequest="));
    assert!(common::query_param(&url, "RelayState").is_none());
}

#[test]
fn test_relay_state_round_trips_through_url_encoding() {
    let sp = ServiceProvider::new(common::sp_config()).unwrap();
    let relay_state = "https://sp.test/app?x=1&y=a b/ü";
    let url = sp.build_auth_url(Some(relay_state)).unwrap();
    assert_eq!(
        common::query_param(&url, "RelayState").as_deref(),
        Some(relay_state)
    );
}

#[test]
fn test_sso_url_with_existing_query() {
    let mut config = common::sp_config();
    config.identity_provider_sso_url = "https://idp.test/saml/sso?tenant=acme".into();
    let sp = ServiceProvider::new(config).unwrap();

    let url = sp.build_auth_url(Some("state")).unwrap();
    assert!(url.starts_with("https://idp.test/saml/sso?tenant=acme&SAMLRequest="));
    let names: Vec<_> = common::query_pairs(&url).into_iter().map(|(k, _)| k).collect();
    assert_eq!(names, ["tenant", "SAMLRequest", "RelayState"]);
}

#[test]
fn test_post_binding_form() {
    let sp = ServiceProvider::new(common::sp_config()).unwrap();
    let form = sp.auth_post_form(Some("foobar")).unwrap().0;
    assert!(form.contains(r#"action="https://idp.test/saml/sso""#));
    assert!(form.contains(r#"name="RelayState" value="foobar""#));

    let body = sp.build_auth_body_post().unwrap();
    let xml = saml_sp::binding::decode_post(&body).unwrap();
    assert!(xml.starts_with("<samlp:AuthnRequest "));
}
