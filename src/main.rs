use log::debug;
use tinysh::Interpreter;

fn main() -> rustyline::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    debug!("starting interactive loop");

    Interpreter::default().repl()
}
