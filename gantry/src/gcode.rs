pub(crate) mod command;
mod interpreter;
mod parse_gcode;
mod parse_numbers;

pub use command::MotionCommand;
pub use command::MotionSink;
pub use command::Positioning;
pub use command::Units;
pub use interpreter::Code;
pub use interpreter::GCodeInterpreter;
pub use interpreter::Instruction;
pub use interpreter::InterpreterState;
pub use interpreter::DEFAULT_FEED_RATE;
pub use parse_gcode::parse_words;
pub use parse_gcode::Param;
pub use parse_gcode::ParamLetter;
pub use parse_gcode::Word;
