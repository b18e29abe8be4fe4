mod history;
mod playback;
mod player;
mod process;

#[cfg(test)]
pub(crate) use history::*;
pub(crate) use playback::*;
pub(crate) use player::*;
#[cfg(test)]
pub(crate) use process::tee_tail;
