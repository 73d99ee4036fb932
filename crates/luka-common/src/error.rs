use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),
}

pub type CommonResult<T> = Result<T, CommonError>;
