//! Human-readable race results.

use serde::Serialize;

use crate::engine::RaceGraph;

/// Per-rover stats line payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoverLine {
    pub rover: u8,
    pub length: f64,
    pub reachable: bool,
}

/// Displayable summary of a finished race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceSummary {
    pub rovers: Vec<RoverLine>,
    pub winners: Vec<u8>,
    /// Zero when no rover reached the goal.
    pub win_length: f64,
    pub time_spent_ms: f64,
    pub operation_count: usize,
}

impl RaceSummary {
    pub fn from_graph(graph: &RaceGraph) -> Self {
        let rovers = graph
            .rovers
            .iter()
            .enumerate()
            .map(|(index, rover)| RoverLine {
                rover: index as u8,
                length: rover.length,
                reachable: rover.is_reachable(),
            })
            .collect();
        Self {
            rovers,
            winners: graph.winners.clone(),
            win_length: if graph.winners.is_empty() {
                0.0
            } else {
                graph.win_length
            },
            time_spent_ms: graph.time_spent_ms,
            operation_count: graph.operation_count,
        }
    }

    /// One-line verdict.
    pub fn headline(&self) -> String {
        match self.winners.as_slice() {
            [] => String::from("no rover can reach the goal"),
            [winner] => format!("rover {winner} wins at length {:.2}", self.win_length),
            winners => {
                let list = winners
                    .iter()
                    .map(|winner| winner.to_string())
                    .collect::<Vec<_>>()
                    .join(" and ");
                format!("rovers {list} tie at length {:.2}", self.win_length)
            }
        }
    }

    /// Per-rover lines, after the original stats panel's wording.
    pub fn rover_lines(&self) -> Vec<String> {
        self.rovers
            .iter()
            .map(|line| {
                if line.reachable {
                    format!("rover {}: length {:.2}", line.rover, line.length)
                } else {
                    format!("rover {}: path does not exist", line.rover)
                }
            })
            .collect()
    }
}
