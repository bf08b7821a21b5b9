use common::model::agent::AgentRef;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("No agents found. Please add agents first.")]
pub struct NoAgentsError;

/// The agents a single upload is distributed across, in a fixed order.
///
/// Can only be built non-empty, so `agent_for` always has a target.
#[derive(Debug, Clone)]
pub struct AgentSnapshot {
    agents: Vec<AgentRef>,
}

impl AgentSnapshot {
    pub fn new(agents: Vec<AgentRef>) -> Result<Self, NoAgentsError> {
        if agents.is_empty() {
            return Err(NoAgentsError);
        }
        Ok(Self { agents })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Round-robin target for the row at `position`.
    pub fn agent_for(&self, position: usize) -> &AgentRef {
        &self.agents[position % self.agents.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str) -> AgentRef {
        AgentRef {
            id: id.to_string(),
            name: id.to_uppercase(),
            email: format!("{id}@example.com"),
        }
    }

    #[test]
    fn empty_agent_list_is_rejected() {
        assert_eq!(AgentSnapshot::new(Vec::new()).unwrap_err(), NoAgentsError);
    }

    #[test]
    fn positions_wrap_around_the_agent_list() {
        let snapshot = AgentSnapshot::new(vec![agent("x"), agent("y"), agent("z")]).unwrap();
        let picked: Vec<_> = (0..7).map(|i| snapshot.agent_for(i).id.as_str()).collect();
        assert_eq!(picked, vec!["x", "y", "z", "x", "y", "z", "x"]);
    }
}
