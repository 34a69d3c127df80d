mod analyses;
mod notes;
