use std::io::{self, BufRead, Write};

use color_eyre::eyre::Result;
use tracing::{debug, info, warn};

use crate::config::UserConfig;
use crate::inference::{respond, InferenceError, ModelSlot};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipeStats {
    pub served: usize,
    pub failed: usize,
}

pub fn run(config: &UserConfig, pretty: bool) -> Result<()> {
    let slot = ModelSlot::global();
    if let Err(e) = slot.init(&config.paths.model) {
        warn!(error = %e, "Serving without a model");
    }

    let stats = serve(slot, io::stdin().lock(), io::stdout().lock(), pretty)?;

    info!(
        served = stats.served,
        failed = stats.failed,
        model_loaded = slot.is_loaded(),
        "Input closed"
    );
    Ok(())
}

/// Answer every non-blank input line with exactly one response. Only I/O
/// failures on the streams themselves end the loop.
pub fn serve(
    slot: &ModelSlot,
    mut input: impl BufRead,
    mut output: impl Write,
    pretty: bool,
) -> io::Result<PipeStats> {
    let mut stats = PipeStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => respond(slot, line.trim_end_matches(&['\r', '\n'][..])),
            Err(e) => {
                InferenceError::InvalidInput(format!("request is not valid UTF-8: {}", e))
                    .into_response()
            }
        };

        stats.served += 1;
        if !response.is_ok() {
            stats.failed += 1;
            debug!(request = stats.served, "Request failed");
        }

        writeln!(output, "{}", response.to_json(pretty)?)?;
        output.flush()?;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::trained_slot;
    use cellwise_protocol::{ErrorKind, InferenceResponse};
    use pretty_assertions::assert_eq;

    fn run_lines(slot: &ModelSlot, input: &[u8], pretty: bool) -> (PipeStats, String) {
        let mut out = Vec::new();
        let stats = serve(slot, input, &mut out, pretty).unwrap();
        (stats, String::from_utf8(out).unwrap())
    }

    fn responses(out: &str) -> Vec<InferenceResponse> {
        out.lines()
            .map(|l| InferenceResponse::from_json(l).unwrap())
            .collect()
    }

    fn error_kind(response: &InferenceResponse) -> Option<ErrorKind> {
        match response {
            InferenceResponse::Error { kind, .. } => Some(*kind),
            InferenceResponse::Ok(_) => None,
        }
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_stream() {
        let slot = trained_slot();
        let mut input = Vec::new();
        input.extend_from_slice(b"{\"voltage\":4.0,\"current\":-2.0,\"temperature\":25,\"cycle\":10}\n");
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(b"{\"voltage\":4.0,\"current\":-2.0,\"temperature\":45,\"cycle\":10}\n");

        let (stats, out) = run_lines(&slot, &input, false);
        let responses = responses(&out);

        assert_eq!(stats, PipeStats { served: 3, failed: 1 });
        assert_eq!(responses.len(), 3);
        assert!(responses[0].is_ok());
        assert_eq!(error_kind(&responses[1]), Some(ErrorKind::InvalidInput));
        match &responses[2] {
            InferenceResponse::Ok(map) => {
                assert_eq!(map["condition"], "OVERHEATING WARNING");
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_lines_get_one_response_each() {
        let slot = trained_slot();
        let input = b"{\"voltage\":\"3.9\",\"current\":\"-2\",\"temperature\":\"27\",\"cycle\":\"400\"}\r\n\
\n\
not json\n\
{\"voltage\":3.9,\"current\":-2.0,\"temperature\":27}\n\
{\"voltage\":-1,\"current\":-2.0,\"temperature\":27,\"cycle\":5}\n\
{\"voltage\":3.9,\"current\":-2.0,\"temperature\":27,\"cycle\":400}";

        let (stats, out) = run_lines(&slot, input, false);
        let kinds: Vec<Option<ErrorKind>> = responses(&out).iter().map(error_kind).collect();

        assert_eq!(
            kinds,
            vec![
                None,
                Some(ErrorKind::InvalidInput),
                Some(ErrorKind::InvalidInput),
                Some(ErrorKind::InvalidInput),
                None,
            ]
        );
        assert_eq!(stats, PipeStats { served: 5, failed: 3 });
    }

    #[test]
    fn test_without_model_every_line_is_model_not_found() {
        let slot = ModelSlot::new();
        let input = b"{\"voltage\":4.0,\"current\":-2.0,\"temperature\":25,\"cycle\":10}\n\
{\"voltage\":3.8,\"current\":-2.0,\"temperature\":30,\"cycle\":500}\n";

        let (stats, out) = run_lines(&slot, input, false);
        let responses = responses(&out);

        assert_eq!(stats, PipeStats { served: 2, failed: 2 });
        assert!(responses
            .iter()
            .all(|r| error_kind(r) == Some(ErrorKind::ModelNotFound)));
    }

    #[test]
    fn test_default_output_is_one_line_per_response() {
        let slot = trained_slot();
        let input = b"{\"voltage\":4.0,\"current\":-2.0,\"temperature\":25,\"cycle\":10}\nnot json\n";

        let (_, out) = run_lines(&slot, input, false);
        assert_eq!(out.lines().count(), 2);

        let (_, pretty) = run_lines(&slot, input, true);
        assert!(pretty.lines().count() > 2);
    }
}
