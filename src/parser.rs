//! Recovers routes and their stops from the hand written route sheet.
//!
//! The sheet has no grammar beyond the `ROUTE:` sentinel, so every line is
//! classified by its shape and by what is currently open:
//!
//! ```text
//! ROUTE:
//! 7            <- route name, whatever it looks like
//! 1            <- stop number
//! 7:15         <- time
//! 12 Main St   <- location
//! ```
//!
//! Known quirks that are kept on purpose:
//! - the first line after `ROUTE:` is the name even if it is blank or looks like a stop number or a time
//! - a stop missing its time or location is dropped silently when the next stop or route starts
//! - a malformed time like `7:5` ends up as the location, so its stop never gets a time and is dropped
//! - when a stop has several free text lines the last one is the location
use std::io::{self, BufRead};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::parsed_model::{ParsedRoute, ParsedStop};

pub const ROUTE_SENTINEL: &str = "ROUTE:";

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,2}:[0-9]{2}$").expect("time pattern should be a valid regex")
});

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LineKind {
    Blank,
    RouteStart,
    StopNumber(u32),
    Time,
    Text,
}

fn classify(line: &str) -> LineKind {
    if line.is_empty() {
        LineKind::Blank
    } else if line == ROUTE_SENTINEL {
        LineKind::RouteStart
    } else if line.bytes().all(|b| b.is_ascii_digit()) {
        // a number too big for a stop is just text
        line.parse().map_or(LineKind::Text, LineKind::StopNumber)
    } else if TIME_PATTERN.is_match(line) {
        LineKind::Time
    } else {
        LineKind::Text
    }
}

#[derive(Debug)]
struct PendingStop {
    stop_number: u32,
    time: Option<String>,
    location: Option<String>,
}

impl PendingStop {
    fn new(stop_number: u32) -> Self {
        PendingStop {
            stop_number,
            time: None,
            location: None,
        }
    }

    fn complete(self) -> Option<ParsedStop> {
        Some(ParsedStop {
            stop_number: self.stop_number,
            time: self.time?,
            location: self.location?,
        })
    }
}

/// Line by line parser. Feed it every line of the sheet in order, then call [`RouteParser::finish`].
#[derive(Debug, Default)]
pub struct RouteParser {
    routes: Vec<ParsedRoute>,
    current_route: Option<ParsedRoute>,
    current_stop: Option<PendingStop>,
}

impl RouteParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        let line = line.trim();
        let kind = classify(line);

        if kind == LineKind::RouteStart {
            self.flush_route();
            self.current_route = Some(ParsedRoute::default());
            return;
        }

        let Some(route) = self.current_route.as_mut() else {
            debug!(line, "ignoring line before the first route");
            return;
        };

        // even a blank line, which leaves the route with an empty name
        if route.name.is_none() {
            route.name = Some(line.to_string());
            return;
        }

        if kind == LineKind::Blank {
            return;
        }

        if let LineKind::StopNumber(stop_number) = kind {
            self.flush_stop();
            self.current_stop = Some(PendingStop::new(stop_number));
            return;
        }

        let Some(stop) = self.current_stop.as_mut() else {
            debug!(line, "ignoring line outside of a stop");
            return;
        };

        if kind == LineKind::Time {
            stop.time = Some(line.to_string());
        } else {
            stop.location = Some(line.to_string());
        }
    }

    /// Flushes the last stop and route and returns everything parsed
    pub fn finish(mut self) -> Vec<ParsedRoute> {
        self.flush_route();
        self.routes
    }

    fn flush_stop(&mut self) {
        let Some(pending) = self.current_stop.take() else {
            return;
        };

        let stop_number = pending.stop_number;
        match (pending.complete(), self.current_route.as_mut()) {
            (Some(stop), Some(route)) => route.stops.push(stop),
            _ => debug!(stop_number, "dropping incomplete stop"),
        }
    }

    fn flush_route(&mut self) {
        self.flush_stop();

        if let Some(route) = self.current_route.take() {
            self.routes.push(route);
        }
    }
}

pub fn parse_lines<I, S>(lines: I) -> Vec<ParsedRoute>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = RouteParser::new();
    for line in lines {
        parser.feed(line.as_ref());
    }
    parser.finish()
}

/// Only fails if the reader does
pub fn parse_reader<R: BufRead>(reader: R) -> io::Result<Vec<ParsedRoute>> {
    let lines = reader.lines().collect::<io::Result<Vec<_>>>()?;

    Ok(parse_lines(lines))
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use super::*;

    fn stop(stop_number: u32, time: &str, location: &str) -> ParsedStop {
        ParsedStop {
            stop_number,
            time: time.to_string(),
            location: location.to_string(),
        }
    }

    fn parse(text: &str) -> Vec<ParsedRoute> {
        parse_lines(text.lines())
    }

    fn render(routes: &[ParsedRoute]) -> String {
        let mut text = String::new();
        for route in routes {
            writeln!(text, "{ROUTE_SENTINEL}").unwrap();
            if let Some(name) = &route.name {
                writeln!(text, "{name}").unwrap();
            }
            for stop in &route.stops {
                writeln!(text, "{}\n{}\n{}", stop.stop_number, stop.time, stop.location).unwrap();
            }
        }
        text
    }

    #[test]
    fn test_two_routes() {
        let routes = parse("ROUTE:\nA\n1\n7:15\n12 Main St\nROUTE:\nB\n2\n8:05\n5 Oak Ave\n");

        assert_eq!(
            routes,
            vec![
                ParsedRoute {
                    name: Some("A".to_string()),
                    stops: vec![stop(1, "7:15", "12 Main St")],
                },
                ParsedRoute {
                    name: Some("B".to_string()),
                    stops: vec![stop(2, "8:05", "5 Oak Ave")],
                },
            ]
        );
    }

    #[test]
    fn test_stop_number_without_fields_is_dropped() {
        let routes = parse("ROUTE:\nA\n1\n2\n7:20\nElm St\n");

        assert_eq!(routes[0].stops, vec![stop(2, "7:20", "Elm St")]);
    }

    #[test]
    fn test_malformed_time_becomes_location_and_stop_is_dropped() {
        let routes = parse("ROUTE:\nA\n1\n7:5\n2\n7:30\nElm St\n");

        assert_eq!(routes[0].stops, vec![stop(2, "7:30", "Elm St")]);
    }

    #[test]
    fn test_stop_without_location_is_dropped_at_end_of_input() {
        let routes = parse("ROUTE:\nA\n1\n7:15\n");

        assert_eq!(routes.len(), 1);
        assert!(routes[0].stops.is_empty());
    }

    #[test]
    fn test_incomplete_stop_is_not_carried_into_next_route() {
        let routes = parse("ROUTE:\nA\n1\n7:15\nROUTE:\nB\n8:00\nPine Rd\n");

        assert!(routes[0].stops.is_empty());
        assert!(routes[1].stops.is_empty());
    }

    #[test]
    fn test_name_line_takes_anything() {
        let routes = parse("ROUTE:\n7:15\n1\n7:20\nElm St\nROUTE:\n42\n");

        assert_eq!(routes[0].name.as_deref(), Some("7:15"));
        assert_eq!(routes[0].stops, vec![stop(1, "7:20", "Elm St")]);
        assert_eq!(routes[1].name.as_deref(), Some("42"));
        assert!(routes[1].stops.is_empty());
    }

    #[test]
    fn test_blank_line_after_sentinel_is_an_empty_name() {
        let routes = parse("ROUTE:\n\n1\n7:15\nElm St\n");

        assert_eq!(
            routes,
            vec![ParsedRoute {
                name: Some(String::new()),
                stops: vec![stop(1, "7:15", "Elm St")],
            }]
        );
    }

    #[test]
    fn test_blank_lines_never_become_a_location() {
        let routes = parse("ROUTE:\nA\n1\n7:15\nElm St\n\n   \n2\n");

        assert_eq!(routes[0].stops, vec![stop(1, "7:15", "Elm St")]);
    }

    #[test]
    fn test_trailing_sentinel_gives_unnamed_empty_route() {
        let routes = parse("ROUTE:\nA\n1\n7:15\nElm St\nROUTE:\n");

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1], ParsedRoute::default());
    }

    #[test]
    fn test_back_to_back_sentinels() {
        let routes = parse("ROUTE:\nROUTE:\nB\n");

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].name, None);
        assert_eq!(routes[1].name.as_deref(), Some("B"));
    }

    #[test]
    fn test_lines_before_first_route_are_ignored() {
        let routes = parse("Bus schedule 2024\n1\n7:15\nElm St\nROUTE:\nA\n");

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].name.as_deref(), Some("A"));
        assert!(routes[0].stops.is_empty());
    }

    #[test]
    fn test_no_sentinel_no_routes() {
        assert!(parse("A\n1\n7:15\nElm St\n").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_last_location_line_wins() {
        let routes = parse("ROUTE:\nA\n1\n7:15\nCorner of\nElm St & Pine Rd\n");

        assert_eq!(routes[0].stops, vec![stop(1, "7:15", "Elm St & Pine Rd")]);
    }

    #[test]
    fn test_location_before_time() {
        let routes = parse("ROUTE:\nA\n1\nElm St\n7:15\n");

        assert_eq!(routes[0].stops, vec![stop(1, "7:15", "Elm St")]);
    }

    #[test]
    fn test_time_outside_of_stop_is_ignored() {
        let routes = parse("ROUTE:\nA\n7:00\nDepot\n1\n7:15\nElm St\n");

        assert_eq!(routes[0].stops, vec![stop(1, "7:15", "Elm St")]);
    }

    #[test]
    fn test_whitespace_and_blank_lines() {
        let routes = parse("\n  ROUTE:  \r\n  A \r\n\n 1\r\n\n 07:15 \r\n  12 Main St  \r\n\n");

        assert_eq!(routes[0].name.as_deref(), Some("A"));
        assert_eq!(routes[0].stops, vec![stop(1, "07:15", "12 Main St")]);
    }

    #[test]
    fn test_oversized_number_is_text() {
        let routes = parse("ROUTE:\nA\n1\n7:15\n99999999999\n");

        assert_eq!(routes[0].stops, vec![stop(1, "7:15", "99999999999")]);
    }

    #[test]
    fn test_three_digit_hour_is_not_a_time() {
        assert_eq!(classify("123:45"), LineKind::Text);
        assert_eq!(classify("12:345"), LineKind::Text);
        assert_eq!(classify("1:45"), LineKind::Time);
        assert_eq!(classify("0012"), LineKind::StopNumber(12));
    }

    #[test]
    fn test_stops_keep_source_order() {
        let routes = parse("ROUTE:\nA\n3\n7:30\nC St\n1\n7:10\nA St\n2\n7:20\nB St\n");

        let numbers: Vec<u32> = routes[0].stops.iter().map(|s| s.stop_number).collect();
        assert_eq!(numbers, vec![3, 1, 2]);
    }

    #[test]
    fn test_reparsing_rendered_routes_is_idempotent() {
        let text = "intro\nROUTE:\nA\n1\n7:15\n12 Main St\n2\n3\n7:40\n9 Elm St\n\
                    ROUTE:\nROUTE:\nC\n4\n7:5\nROUTE:\n\n5\n8:00\nOak Ave\nROUTE:\n";
        let routes = parse(text);

        assert_eq!(parse(&render(&routes)), routes);
    }

    #[test]
    fn test_parse_reader() -> Result<(), anyhow::Error> {
        let routes = parse_reader("ROUTE:\nA\n1\n7:15\nElm St".as_bytes())?;

        assert_eq!(routes[0].stops, vec![stop(1, "7:15", "Elm St")]);

        Ok(())
    }
}
