mod backend;
mod logger;
