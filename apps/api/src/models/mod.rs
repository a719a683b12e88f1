pub mod job_role;
