// route.rs — Print the route decision for an input line, without creating
// a goal. Useful for checking how a line will be classified.

use forge_engine::{route, AgentId};

pub fn execute(line: &str, agent: &str) -> anyhow::Result<()> {
    let agent: AgentId = agent.parse()?;
    let task = route(line, agent)?;
    println!("{}", serde_json::to_string_pretty(&task)?);
    Ok(())
}
