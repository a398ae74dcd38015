//! Diagnostic advice
//!
//! Turns a multi-endpoint sweep into operator-facing recommendations.

use crate::domain::entities::EndpointDiagnostic;
use crate::domain::errors::ErrorKind;

/// Responses slower than this are flagged.
pub const SLOW_RESPONSE_MS: u64 = 2_000;

/// Recommendations for a sweep, primary endpoint first.
pub fn recommendations(results: &[EndpointDiagnostic]) -> Vec<String> {
    let mut advice = Vec::new();

    let Some(primary) = results.first() else {
        advice.push("No inference endpoints are configured.".to_string());
        return advice;
    };

    if primary.success {
        advice.push("The primary inference endpoint is reachable. No action needed.".to_string());
        if primary.info.as_ref().map(|i| i.simulation_mode()).unwrap_or(false) {
            advice.push(
                "The inference service runs in simulation mode. Deploy the model to get real predictions."
                    .to_string(),
            );
        }
        if primary.response_time_ms > SLOW_RESPONSE_MS {
            advice.push(format!(
                "The primary endpoint responded slowly ({}ms). Consider scaling the deployment.",
                primary.response_time_ms
            ));
        }
        return advice;
    }

    advice.push(format!("The primary inference endpoint {} is unreachable.", primary.url));
    match primary.error_kind {
        Some(ErrorKind::ConnectionRefused) => advice.push(
            "The service refused the connection. Make sure it is running and reachable.".to_string(),
        ),
        Some(ErrorKind::DnsNotFound) => {
            advice.push("The host could not be resolved. Check the configured URL.".to_string())
        }
        Some(ErrorKind::Timeout) => advice.push(
            "The request timed out. The service may be starting up or overloaded.".to_string(),
        ),
        Some(ErrorKind::ServerError(code)) => advice.push(format!(
            "The service answered with status {}. Check its logs.",
            code
        )),
        Some(ErrorKind::ServiceNotReady) => advice.push(
            "The service answered without an online marker. It may still be loading the model."
                .to_string(),
        ),
        _ => {}
    }

    match results.iter().skip(1).find(|r| r.success) {
        Some(alternate) => advice.push(format!(
            "Alternate endpoint {} is reachable and will be used.",
            alternate.url
        )),
        None => advice.push(
            "No endpoint is reachable. Predictions are simulated until the service recovers."
                .to_string(),
        ),
    }

    advice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ServiceInfo;

    fn ok(url: &str, ms: u64, simulation: bool) -> EndpointDiagnostic {
        EndpointDiagnostic {
            url: url.to_string(),
            success: true,
            response_time_ms: ms,
            status_code: Some(200),
            error_kind: None,
            error: None,
            info: Some(ServiceInfo {
                status: Some("online".to_string()),
                simulation_mode_enabled: Some(simulation),
                ..Default::default()
            }),
        }
    }

    fn failed(url: &str, kind: ErrorKind) -> EndpointDiagnostic {
        EndpointDiagnostic {
            url: url.to_string(),
            success: false,
            response_time_ms: 5,
            status_code: kind.status_code(),
            error_kind: Some(kind),
            error: Some(kind.to_string()),
            info: None,
        }
    }

    #[test]
    fn test_healthy_primary() {
        let advice = recommendations(&[ok("http://a", 120, false)]);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("No action needed"));
    }

    #[test]
    fn test_simulation_and_slow_primary() {
        let advice = recommendations(&[ok("http://a", 2_500, true)]);
        assert_eq!(advice.len(), 3);
        assert!(advice[1].contains("simulation mode"));
        assert!(advice[2].contains("2500ms"));
    }

    #[test]
    fn test_refused_primary_with_alternate() {
        let advice = recommendations(&[
            failed("http://a", ErrorKind::ConnectionRefused),
            failed("http://b", ErrorKind::Timeout),
            ok("http://c", 40, false),
        ]);
        assert!(advice[0].contains("http://a"));
        assert!(advice[1].contains("refused"));
        assert!(advice[2].contains("http://c"));
    }

    #[test]
    fn test_everything_down() {
        let advice = recommendations(&[
            failed("http://a", ErrorKind::DnsNotFound),
            failed("http://b", ErrorKind::ServerError(502)),
        ]);
        assert!(advice[1].contains("resolved"));
        assert!(advice.last().unwrap().contains("simulated"));
    }

    #[test]
    fn test_empty_sweep() {
        assert_eq!(recommendations(&[]).len(), 1);
    }
}
