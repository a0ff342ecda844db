//! Middleware config projection, keyed on the type tag.
//!
//! Each recognized tag has a field table. Only fields that are present and
//! of the expected JSON type are copied; everything else is dropped, so the
//! output never carries a field the input did not.

use serde_json::{Map, Value};

use super::schema;
use crate::model::Middleware;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Str,
    Bool,
    Int,
    /// String or integer, passed through (durations, ports).
    Scalar,
    StrList,
    StrMap,
    /// Resource id: bare string or `{"id": ...}`, emitted as a string.
    Ref,
    RefList,
    Object(&'static [Field]),
}

type Field = (&'static str, Kind);

use Kind::*;

const IP_STRATEGY: &[Field] = &[
    ("depth", Int),
    ("excludedIPs", StrList),
    ("ipv6Subnet", Int),
];

const SOURCE_CRITERION: &[Field] = &[
    ("ipStrategy", Object(IP_STRATEGY)),
    ("requestHeaderName", Str),
    ("requestHost", Bool),
];

const ADD_PREFIX: &[Field] = &[("prefix", Str)];

const BASIC_AUTH: &[Field] = &[
    ("users", StrList),
    ("usersFile", Str),
    ("realm", Str),
    ("removeHeader", Bool),
    ("headerField", Str),
];

const BUFFERING: &[Field] = &[
    ("maxRequestBodyBytes", Int),
    ("memRequestBodyBytes", Int),
    ("maxResponseBodyBytes", Int),
    ("memResponseBodyBytes", Int),
    ("retryExpression", Str),
];

const CHAIN: &[Field] = &[("middlewares", RefList)];

const CIRCUIT_BREAKER: &[Field] = &[
    ("expression", Str),
    ("checkPeriod", Scalar),
    ("fallbackDuration", Scalar),
    ("recoveryDuration", Scalar),
    ("responseCode", Int),
];

const COMPRESS: &[Field] = &[
    ("excludedContentTypes", StrList),
    ("includedContentTypes", StrList),
    ("minResponseBodyBytes", Int),
    ("encodings", StrList),
    ("defaultEncoding", Str),
];

const CONTENT_TYPE: &[Field] = &[("autoDetect", Bool)];

const DIGEST_AUTH: &[Field] = &[
    ("users", StrList),
    ("usersFile", Str),
    ("removeHeader", Bool),
    ("realm", Str),
    ("headerField", Str),
];

const ERRORS: &[Field] = &[("status", StrList), ("service", Ref), ("query", Str)];

const FORWARD_AUTH_TLS: &[Field] = &[
    ("ca", Str),
    ("cert", Str),
    ("key", Str),
    ("insecureSkipVerify", Bool),
    ("caOptional", Bool),
];

const FORWARD_AUTH: &[Field] = &[
    ("address", Str),
    ("tls", Object(FORWARD_AUTH_TLS)),
    ("trustForwardHeader", Bool),
    ("authResponseHeaders", StrList),
    ("authResponseHeadersRegex", Str),
    ("authRequestHeaders", StrList),
    ("addAuthCookiesToResponse", StrList),
    ("headerField", Str),
    ("forwardBody", Bool),
    ("maxBodySize", Int),
    ("preserveLocationHeader", Bool),
];

const GRPC_WEB: &[Field] = &[("allowOrigins", StrList)];

const HEADERS: &[Field] = &[
    ("customRequestHeaders", StrMap),
    ("customResponseHeaders", StrMap),
    ("accessControlAllowCredentials", Bool),
    ("accessControlAllowHeaders", StrList),
    ("accessControlAllowMethods", StrList),
    ("accessControlAllowOriginList", StrList),
    ("accessControlAllowOriginListRegex", StrList),
    ("accessControlExposeHeaders", StrList),
    ("accessControlMaxAge", Int),
    ("addVaryHeader", Bool),
    ("allowedHosts", StrList),
    ("hostsProxyHeaders", StrList),
    ("sslProxyHeaders", StrMap),
    ("stsSeconds", Int),
    ("stsIncludeSubdomains", Bool),
    ("stsPreload", Bool),
    ("forceSTSHeader", Bool),
    ("frameDeny", Bool),
    ("customFrameOptionsValue", Str),
    ("contentTypeNosniff", Bool),
    ("browserXssFilter", Bool),
    ("customBrowserXSSValue", Str),
    ("contentSecurityPolicy", Str),
    ("contentSecurityPolicyReportOnly", Str),
    ("publicKey", Str),
    ("referrerPolicy", Str),
    ("permissionsPolicy", Str),
    ("isDevelopment", Bool),
    ("featurePolicy", Str),
    ("sslRedirect", Bool),
    ("sslTemporaryRedirect", Bool),
    ("sslHost", Str),
    ("sslForceHost", Bool),
];

const IP_ALLOW_LIST: &[Field] = &[
    ("sourceRange", StrList),
    ("ipStrategy", Object(IP_STRATEGY)),
    ("rejectStatusCode", Int),
];

const IP_WHITE_LIST: &[Field] = &[
    ("sourceRange", StrList),
    ("ipStrategy", Object(IP_STRATEGY)),
];

const IN_FLIGHT_REQ: &[Field] = &[
    ("amount", Int),
    ("sourceCriterion", Object(SOURCE_CRITERION)),
];

const CERT_SUBJECT: &[Field] = &[
    ("country", Bool),
    ("province", Bool),
    ("locality", Bool),
    ("organization", Bool),
    ("organizationalUnit", Bool),
    ("commonName", Bool),
    ("serialNumber", Bool),
    ("domainComponent", Bool),
];

const CERT_ISSUER: &[Field] = &[
    ("country", Bool),
    ("province", Bool),
    ("locality", Bool),
    ("organization", Bool),
    ("commonName", Bool),
    ("serialNumber", Bool),
    ("domainComponent", Bool),
];

const CERT_INFO: &[Field] = &[
    ("notAfter", Bool),
    ("notBefore", Bool),
    ("sans", Bool),
    ("serialNumber", Bool),
    ("subject", Object(CERT_SUBJECT)),
    ("issuer", Object(CERT_ISSUER)),
];

const PASS_TLS_CLIENT_CERT: &[Field] = &[("pem", Bool), ("info", Object(CERT_INFO))];

const RATE_LIMIT: &[Field] = &[
    ("average", Int),
    ("period", Scalar),
    ("burst", Int),
    ("sourceCriterion", Object(SOURCE_CRITERION)),
];

const REDIRECT_REGEX: &[Field] = &[
    ("regex", Str),
    ("replacement", Str),
    ("permanent", Bool),
];

const REDIRECT_SCHEME: &[Field] = &[("scheme", Str), ("port", Scalar), ("permanent", Bool)];

const REPLACE_PATH: &[Field] = &[("path", Str)];

const REPLACE_PATH_REGEX: &[Field] = &[("regex", Str), ("replacement", Str)];

const RETRY: &[Field] = &[("attempts", Int), ("initialInterval", Scalar)];

const STRIP_PREFIX: &[Field] = &[("prefixes", StrList), ("forceSlash", Bool)];

const STRIP_PREFIX_REGEX: &[Field] = &[("regex", StrList)];

/// Field table for a type tag. `plugin` is handled separately.
fn fields_for(tag: &str) -> Option<&'static [Field]> {
    let fields = match tag {
        "addPrefix" => ADD_PREFIX,
        "basicAuth" => BASIC_AUTH,
        "buffering" => BUFFERING,
        "chain" => CHAIN,
        "circuitBreaker" => CIRCUIT_BREAKER,
        "compress" => COMPRESS,
        "contentType" => CONTENT_TYPE,
        "digestAuth" => DIGEST_AUTH,
        "errors" => ERRORS,
        "forwardAuth" => FORWARD_AUTH,
        "grpcWeb" => GRPC_WEB,
        "headers" => HEADERS,
        "ipAllowList" => IP_ALLOW_LIST,
        "ipWhiteList" => IP_WHITE_LIST,
        "inFlightReq" => IN_FLIGHT_REQ,
        "passTLSClientCert" => PASS_TLS_CLIENT_CERT,
        "rateLimit" => RATE_LIMIT,
        "redirectRegex" => REDIRECT_REGEX,
        "redirectScheme" => REDIRECT_SCHEME,
        "replacePath" => REPLACE_PATH,
        "replacePathRegex" => REPLACE_PATH_REGEX,
        "retry" => RETRY,
        "stripPrefix" => STRIP_PREFIX,
        "stripPrefixRegex" => STRIP_PREFIX_REGEX,
        _ => return None,
    };
    Some(fields)
}

/// Whether the projection knows how to translate `tag`.
pub fn is_known_type(tag: &str) -> bool {
    tag == "plugin" || fields_for(tag).is_some()
}

/// Projects one middleware. A config that is not a JSON object, or an
/// unknown tag, yields an empty middleware.
pub fn project_middleware(middleware: &Middleware) -> schema::Middleware {
    let mut out = Map::new();
    let Value::Object(config) = &middleware.config else {
        return out;
    };
    let tag = middleware.middleware_type.as_str();

    if tag == "plugin" {
        out.insert(tag.to_string(), Value::Object(config.clone()));
    } else if let Some(fields) = fields_for(tag) {
        out.insert(tag.to_string(), Value::Object(read_fields(config, fields)));
    }
    out
}

fn read_fields(config: &Map<String, Value>, fields: &[Field]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(name, kind)| {
            let value = config.get(*name)?;
            read(value, *kind).map(|v| (name.to_string(), v))
        })
        .collect()
}

fn read(value: &Value, kind: Kind) -> Option<Value> {
    match kind {
        Str => value.as_str().map(Value::from),
        Bool => value.as_bool().map(Value::from),
        Int => integer(value),
        Scalar => value
            .as_str()
            .map(Value::from)
            .or_else(|| integer(value)),
        StrList => {
            let items = value.as_array()?;
            Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(Value::from))
                    .collect(),
            )
        }
        StrMap => {
            let map = value.as_object()?;
            Some(Value::Object(
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), Value::from(s))))
                    .collect(),
            ))
        }
        Ref => reference(value).map(Value::from),
        RefList => {
            let items = value.as_array()?;
            Some(items.iter().filter_map(reference).map(Value::from).collect())
        }
        Object(fields) => value.as_object().map(|m| Value::Object(read_fields(m, fields))),
    }
}

fn integer(value: &Value) -> Option<Value> {
    if let Some(i) = value.as_i64() {
        return Some(Value::from(i));
    }
    // Accept whole floats such as 10.0.
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| Value::from(f as i64))
}

fn reference(value: &Value) -> Option<&str> {
    let id = match value {
        Value::String(s) => s.as_str(),
        Value::Object(m) => m.get("id")?.as_str()?,
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}
