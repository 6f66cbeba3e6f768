mod bdset;
mod birthday;
mod ping;

use bdset::*;
use birthday::*;
use ping::*;
use poise::Command;

use crate::structs::{Data, Error};

pub fn get_commands() -> Vec<Command<Data, Error>> {
    vec![birthday(), bdset(), ping()]
}
