//! Headless plant runner implementation.

use std::io::{self, BufRead, Write};

use plant_core::components::ComponentId;
use plant_core::plant::{Plant, PlantInputs, PlantSpec};

use crate::protocol::{Command, PlantState, Response};
use crate::scenario::Scenario;

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every tick (vs only at the end of a tick batch).
    pub auto_state_output: bool,
    /// Scenario (built-in name or RON path) to load on startup.
    pub scenario: Option<String>,
}

/// One protocol session over a plant.
///
/// Owns the plant and the pending rod command; drivers feed it parsed
/// commands and write out the responses.
pub struct Session {
    plant: Plant,
    /// Rod command applied on the next tick. The rod holds its position
    /// afterwards, so it is consumed once.
    pending_rod: Option<i32>,
    should_quit: bool,
}

impl Session {
    /// Start a session over a freshly built plant.
    #[must_use]
    pub fn new(spec: PlantSpec) -> Self {
        Self {
            plant: Plant::new(spec),
            pending_rod: None,
            should_quit: false,
        }
    }

    /// The live plant.
    #[must_use]
    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    /// Whether a quit command has been processed.
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run a scenario script before interactive control starts.
    ///
    /// Emits one state snapshot per scripted tick when `auto_state` is set,
    /// otherwise only a final snapshot.
    pub fn run_script(&mut self, script: &[PlantInputs], auto_state: bool) -> Vec<Response> {
        let mut responses = Vec::new();
        for &inputs in script {
            match self.plant.step(inputs) {
                Ok(_) => {
                    if auto_state {
                        responses.push(Response::State(PlantState::capture(&self.plant)));
                    }
                }
                Err(e) => {
                    responses.push(Response::error(e.to_string(), Some("tick")));
                    return responses;
                }
            }
        }
        if !auto_state {
            responses.push(Response::State(PlantState::capture(&self.plant)));
        }
        responses
    }

    /// Process one command, producing the responses to write.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let cmd_name = cmd.name();
        match cmd {
            Command::Tick {
                count,
                water_pumped_in,
                condenser_water_delta,
            } => {
                let mut responses = Vec::new();
                for _ in 0..count {
                    let inputs = PlantInputs {
                        rod_percentage: self.pending_rod.take(),
                        water_pumped_in,
                        condenser_water_delta,
                    };
                    if let Err(e) = self.plant.step(inputs) {
                        responses.push(Response::error(e.to_string(), Some(cmd_name)));
                        return responses;
                    }
                }
                responses.push(Response::State(PlantState::capture(&self.plant)));
                responses
            }

            Command::Query => {
                vec![Response::State(PlantState::capture(&self.plant))]
            }

            Command::SetRod { percentage } => {
                // Validated by the same range check the reactor applies, so
                // an out-of-range command is rejected at the prompt rather
                // than poisoning the next tick.
                if percentage < 0 || percentage > 100 {
                    vec![Response::error(
                        format!("control rod percentage {percentage} not in range [0..100]"),
                        Some(cmd_name),
                    )]
                } else {
                    self.pending_rod = Some(percentage);
                    vec![Response::ack(cmd_name)]
                }
            }

            Command::SetValve { id, open } => {
                match self.plant.set_valve_open(ComponentId(id), open) {
                    Ok(()) => vec![Response::ack(cmd_name)],
                    Err(e) => vec![Response::error(e.to_string(), Some(cmd_name))],
                }
            }

            Command::Manifest => vec![Response::manifest(&self.plant)],

            Command::Hash => vec![Response::StateHash {
                tick: self.plant.time_steps_used(),
                hash: self.plant.state_hash(),
            }],

            Command::Quit => {
                self.should_quit = true;
                vec![Response::Bye]
            }
        }
    }
}

/// Headless runner for scripted and interactive plant control.
pub struct HeadlessRunner {
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Create a new headless runner with default config.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeadlessConfig::default(),
        }
    }

    /// Create a runner with custom configuration.
    #[must_use]
    pub fn with_config(config: HeadlessConfig) -> Self {
        Self { config }
    }

    /// Run the headless loop.
    ///
    /// Loads the configured scenario (if any), runs its script, then reads
    /// JSON commands from stdin and writes responses to stdout until quit
    /// or end of input.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if stdin or stdout fails, and a scenario error
    /// if the configured scenario does not load.
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let mut session = match &self.config.scenario {
            Some(name_or_path) => {
                let scenario = Scenario::resolve(name_or_path)?;
                tracing::info!(name = %scenario.name, ticks = scenario.script.len(), "scenario loaded");
                let mut session = Session::new(scenario.plant);
                for response in session.run_script(&scenario.script, self.config.auto_state_output)
                {
                    out.write_all(response.to_json_line().as_bytes())?;
                }
                session
            }
            None => Session::new(PlantSpec::default()),
        };

        out.write_all(
            Response::ready(session.plant().time_steps_used())
                .to_json_line()
                .as_bytes(),
        )?;
        out.flush()?;

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let responses = match Command::from_json(line) {
                Ok(cmd) => session.handle(cmd),
                Err(e) => vec![Response::error(format!("Parse error: {e}"), None)],
            };
            for response in responses {
                out.write_all(response.to_json_line().as_bytes())?;
            }
            out.flush()?;

            if session.should_quit() {
                break;
            }
        }
        Ok(())
    }
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(PlantSpec::default())
    }

    #[test]
    fn test_tick_advances_and_reports_state() {
        let mut session = session();
        let responses = session.handle(Command::Tick {
            count: 2,
            water_pumped_in: 0,
            condenser_water_delta: 0,
        });
        assert_eq!(responses.len(), 1);
        match &responses[0] {
            Response::State(state) => {
                assert_eq!(state.tick, 2);
                assert_eq!(state.reactor.temperature, 200);
            }
            other => panic!("expected state response, got {other:?}"),
        }
    }

    #[test]
    fn test_set_rod_applies_on_next_tick() {
        let mut session = session();
        let responses = session.handle(Command::SetRod { percentage: 0 });
        assert!(matches!(responses[0], Response::Ack { .. }));

        session.handle(Command::Tick {
            count: 1,
            water_pumped_in: 0,
            condenser_water_delta: 0,
        });
        // Rods fully withdrawn: no heating at all.
        assert_eq!(session.plant().reactor().temperature(), 0);
        assert_eq!(session.plant().reactor().rod_percentage(), 0);
    }

    #[test]
    fn test_set_rod_rejects_out_of_range() {
        let mut session = session();
        let responses = session.handle(Command::SetRod { percentage: 150 });
        assert!(matches!(responses[0], Response::Error { .. }));
        // The rejected command must not linger into the next tick.
        session.handle(Command::Tick {
            count: 1,
            water_pumped_in: 0,
            condenser_water_delta: 0,
        });
        assert_eq!(session.plant().reactor().rod_percentage(), 100);
    }

    #[test]
    fn test_set_valve_by_id() {
        let mut session = session();
        let valve_id = session.plant().valves().next().unwrap().id();
        let responses = session.handle(Command::SetValve {
            id: valve_id.0,
            open: false,
        });
        assert!(matches!(responses[0], Response::Ack { .. }));
        assert!(!session.plant().valves().next().unwrap().is_open());

        let responses = session.handle(Command::SetValve { id: 99, open: true });
        assert!(matches!(responses[0], Response::Error { .. }));
    }

    #[test]
    fn test_query_does_not_advance_time() {
        let mut session = session();
        session.handle(Command::Query);
        session.handle(Command::Query);
        assert_eq!(session.plant().time_steps_used(), 0);
    }

    #[test]
    fn test_quit_sets_flag() {
        let mut session = session();
        let responses = session.handle(Command::Quit);
        assert!(matches!(responses[0], Response::Bye));
        assert!(session.should_quit());
    }

    #[test]
    fn test_script_runs_to_completion() {
        let mut session = session();
        let script = vec![PlantInputs::default(); 5];
        let responses = session.run_script(&script, false);
        assert_eq!(responses.len(), 1);
        assert_eq!(session.plant().time_steps_used(), 5);
    }
}
