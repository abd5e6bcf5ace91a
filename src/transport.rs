//! HTTP responses that carry an encoded request to the IdP through the
//! user agent.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};

use crate::binding::EncodeError;
use crate::saml::params;

/// `302 Found` pointing the browser at a Redirect binding URL. The response
/// has no body and `Location` is its only header.
pub fn redirect_response(location: &str) -> Result<Response, EncodeError> {
    let location =
        HeaderValue::from_str(location).map_err(|e| EncodeError::InvalidLocation(e.to_string()))?;
    let mut response = StatusCode::FOUND.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}

/// Auto-submitting form for the POST binding.
pub fn post_form(action: &str, saml_request: &str, relay_state: Option<&str>) -> Html<String> {
    let relay_state_input = relay_state
        .filter(|rs| !rs.is_empty())
        .map(|rs| {
            format!(
                r#"<input type="hidden" name="{}" value="{}"/>"#,
                params::RELAY_STATE,
                html_escape(rs)
            )
        })
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Sign in</title>
</head>
<body onload="document.forms[0].submit()">
    <form method="post" action="{action}">
        <input type="hidden" name="{name}" value="{value}"/>
        {relay_state_input}
        <noscript>
            <input type="submit" value="Continue"/>
        </noscript>
    </form>
</body>
</html>"#,
        action = html_escape(action),
        name = params::SAML_REQUEST,
        value = html_escape(saml_request),
    ))
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
