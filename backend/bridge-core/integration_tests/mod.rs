mod helpers;

mod bridge;
mod ws;
